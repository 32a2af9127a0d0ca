//! C-compatible FFI API for cross-language bindings.
//!
//! # ABI Contract
//!
//! All exported functions use `extern "C"` calling convention and `#[no_mangle]`
//! to ensure stable symbol names. Inputs are UTF-8 JSON documents: a
//! generation request (see [`GenerationRequest`]) and, optionally, a layout
//! configuration (see [`LayoutConfig`]).
//!
//! ## Memory management
//! - Buffers returned by `hrdoc_*` functions are allocated on the Rust heap.
//! - Callers **must** free them with `hrdoc_free_buffer` / `hrdoc_free_string`.
//! - Passing a null pointer to a free function is a no-op.
//!
//! ## Error handling
//! - Functions that can fail return a `c_int` (0 = success, non-zero = error).
//! - Error details can be retrieved via `hrdoc_last_error`.
//!
//! | code | meaning                                  |
//! |------|------------------------------------------|
//! | 1    | null pointer argument                    |
//! | 2    | input is not valid UTF-8                 |
//! | 3    | malformed request / config / layout JSON |
//! | 4    | template uses unknown variables          |
//! | 5    | layout cannot be completed               |
//! | 6    | encoding failure                         |
//!
//! ## Thread safety
//! - `hrdoc_last_error` uses a thread-local, so it is safe to call from
//!   multiple threads.
//!
//! ## Usage from Go (cgo)
//! ```go
//! // #cgo LDFLAGS: -lhr_letter_forge
//! // #include <stdint.h>
//! // extern int hrdoc_generate_pdf(const char* json, uint32_t json_len,
//! //                               uint8_t** out_buf, uint32_t* out_len);
//! // extern void hrdoc_free_buffer(uint8_t* buf, uint32_t len);
//! // extern const char* hrdoc_last_error();
//! import "C"
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::slice;

use crate::error::Error;
use crate::layout_config::LayoutConfig;
use crate::model::GeneratedDocument;
use crate::pipeline::{build_document, generate_pdf, GenerationRequest};
use crate::render::render_pdf;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Record `err` and return its ABI code.
fn fail(err: &Error) -> c_int {
    set_last_error(&err.to_string());
    match err {
        Error::Json(_) => 3,
        Error::UnresolvedVariables(_) => 4,
        Error::InvalidLayout(_) => 5,
        Error::Encoding(_) | Error::Io(_) => 6,
    }
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
unsafe fn read_utf8<'a>(ptr: *const u8, len: u32) -> Result<&'a str, c_int> {
    let bytes = slice::from_raw_parts(ptr, len as usize);
    std::str::from_utf8(bytes).map_err(|e| {
        set_last_error(&format!("Invalid UTF-8: {e}"));
        2
    })
}

/// # Safety
/// `ptr`, if non-null, must be a valid null-terminated string.
unsafe fn read_config(ptr: *const c_char) -> Result<LayoutConfig, c_int> {
    if ptr.is_null() {
        return Ok(LayoutConfig::a4());
    }
    let json = CStr::from_ptr(ptr).to_str().map_err(|e| {
        set_last_error(&format!("Invalid UTF-8 in config JSON: {e}"));
        2
    })?;
    LayoutConfig::from_json(json).map_err(|e| fail(&e))
}

/// # Safety
/// `out_buf` and `out_len` must be valid pointers.
unsafe fn write_buffer(bytes: Vec<u8>, out_buf: *mut *mut u8, out_len: *mut u32) {
    let len = bytes.len() as u32;
    let buf = bytes.into_boxed_slice();
    *out_buf = Box::into_raw(buf) as *mut u8;
    *out_len = len;
}

/// # Safety
/// `out` must be a valid pointer.
unsafe fn write_string(s: String, out: *mut *mut c_char) -> c_int {
    match CString::new(s) {
        Ok(cs) => {
            *out = cs.into_raw();
            0
        }
        Err(_) => {
            set_last_error("JSON contained null byte");
            6
        }
    }
}

// ---------------------------------------------------------------------------
// Core API
// ---------------------------------------------------------------------------

/// Generate a PDF letter from a JSON generation request, A4 defaults.
///
/// # Parameters
/// - `json_ptr`: pointer to UTF-8 request JSON (not necessarily null-terminated)
/// - `json_len`: length of the JSON data in bytes
/// - `out_buf`: on success, receives a pointer to heap-allocated PDF bytes
/// - `out_len`: on success, receives the length of the PDF buffer
///
/// # Returns
/// `0` on success, non-zero on error. On error, call `hrdoc_last_error`.
///
/// # Safety
/// - `json_ptr` must point to `json_len` valid bytes.
/// - `out_buf` and `out_len` must be valid pointers.
/// - The caller must free `*out_buf` by calling `hrdoc_free_buffer`.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_generate_pdf(
    json_ptr: *const u8,
    json_len: u32,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    hrdoc_generate_pdf_ex(json_ptr, json_len, ptr::null(), out_buf, out_len, ptr::null_mut())
}

/// Generate a PDF with an optional layout config and optionally return the
/// page model as JSON.
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 request JSON
/// - `config_json`: null-terminated layout config JSON, or `NULL` for A4
///   defaults; missing fields take their defaults
/// - `out_buf`, `out_len`: PDF output (free with `hrdoc_free_buffer`)
/// - `out_layout_json`: `NULL`, or receives the page model JSON (free with
///   `hrdoc_free_string`)
///
/// # Returns
/// `0` on success.
///
/// # Safety
/// Same as `hrdoc_generate_pdf`; `config_json`, if non-null, must be a valid
/// null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_generate_pdf_ex(
    json_ptr: *const u8,
    json_len: u32,
    config_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
    out_layout_json: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let json = match read_utf8(json_ptr, json_len) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = match read_config(config_json) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let request = match GenerationRequest::from_json(json) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    match generate_pdf(&request, &config) {
        Ok((pdf_bytes, doc)) => {
            if !out_layout_json.is_null() {
                let rc = write_string(doc.to_json(), out_layout_json);
                if rc != 0 {
                    return rc;
                }
            }
            write_buffer(pdf_bytes, out_buf, out_len);
            0
        }
        Err(e) => fail(&e),
    }
}

/// Lay out a request without rendering. Returns the page model as JSON.
///
/// # Parameters
/// - `json_ptr`, `json_len`: UTF-8 request JSON
/// - `config_json`: layout config JSON or `NULL`
/// - `out_json_ptr`: receives a pointer to a null-terminated JSON string
///
/// # Returns
/// `0` on success.
///
/// # Safety
/// Same as `hrdoc_generate_pdf_ex`.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_compute_layout(
    json_ptr: *const u8,
    json_len: u32,
    config_json: *const c_char,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let json = match read_utf8(json_ptr, json_len) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let config = match read_config(config_json) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let result = GenerationRequest::from_json(json).and_then(|r| build_document(&r, &config));
    match result {
        Ok(doc) => write_string(doc.to_json(), out_json_ptr),
        Err(e) => fail(&e),
    }
}

/// Classify the placeholders of a request's subject and body. Returns
/// `{"system": [...], "custom": [...], "unknown": [...]}`. Succeeds even when
/// unknown variables are present; callers inspect `unknown`.
///
/// # Safety
/// `json_ptr` must point to `json_len` valid bytes; `out_json_ptr` must be a
/// valid pointer. Free the result with `hrdoc_free_string`.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_check_template(
    json_ptr: *const u8,
    json_len: u32,
    out_json_ptr: *mut *mut c_char,
) -> c_int {
    if json_ptr.is_null() || out_json_ptr.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let json = match read_utf8(json_ptr, json_len) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let request = match GenerationRequest::from_json(json) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    match serde_json::to_string(&request.check()) {
        Ok(s) => write_string(s, out_json_ptr),
        Err(e) => fail(&Error::Json(e)),
    }
}

/// Render a PDF from page model JSON produced by `hrdoc_compute_layout`.
///
/// `config_json` (or `NULL` for A4 defaults) supplies the encoder settings,
/// such as the highlight colour. Geometry comes from the page model itself.
///
/// # Safety
/// `json_ptr` must be a valid null-terminated string; `config_json` must be
/// `NULL` or a valid null-terminated string; `out_buf` and `out_len` must be
/// valid pointers.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_render_from_layout(
    json_ptr: *const c_char,
    config_json: *const c_char,
    out_buf: *mut *mut u8,
    out_len: *mut u32,
) -> c_int {
    if json_ptr.is_null() || out_buf.is_null() || out_len.is_null() {
        set_last_error("Null pointer argument");
        return 1;
    }
    let json = match CStr::from_ptr(json_ptr).to_str() {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8 in JSON: {e}"));
            return 2;
        }
    };
    let config = match read_config(config_json) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let result = GeneratedDocument::from_json(json).and_then(|doc| render_pdf(&doc, &config));
    match result {
        Ok(pdf_bytes) => {
            write_buffer(pdf_bytes, out_buf, out_len);
            0
        }
        Err(e) => fail(&e),
    }
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

/// Free a PDF buffer returned by `hrdoc_generate_pdf`.
///
/// # Safety
/// `buf` must have been returned by a previous `hrdoc_generate_pdf` (or similar)
/// call, and `len` must be the corresponding length.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_free_buffer(buf: *mut u8, len: u32) {
    if !buf.is_null() {
        let _ = Box::from_raw(slice::from_raw_parts_mut(buf, len as usize));
    }
}

/// Free a JSON string returned by an `hrdoc_*` function.
///
/// # Safety
/// `s` must have been returned by Rust's `CString::into_raw`.
#[no_mangle]
pub unsafe extern "C" fn hrdoc_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = CString::from_raw(s);
    }
}

/// Retrieve the last error message. Returns a null-terminated string.
///
/// The returned pointer is valid until the next `hrdoc_*` call on the same
/// thread. The caller should **not** free this pointer – it is managed
/// internally.
///
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn hrdoc_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        let borrow = e.borrow();
        match borrow.as_ref() {
            Some(cs) => cs.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Return the library version as a null-terminated string.
/// The caller must **not** free this pointer.
#[no_mangle]
pub extern "C" fn hrdoc_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
