//! Host memory queries.
//!
//! Physical memory is read once at startup to size the caches; nothing here
//! is meant to be polled.

use tracing::warn;

/// Bytes in a mebibyte.
pub const MIB: usize = 1024 * 1024;

/// Bytes in a gibibyte.
pub const GIB: usize = 1024 * MIB;

/// Assumed physical memory when the host refuses to tell us.
pub const FALLBACK_PHYSICAL_MEMORY: u64 = 8 * GIB as u64;

/// Total physical memory in bytes, if the platform reports it.
#[cfg(target_os = "macos")]
pub fn physical_memory_bytes() -> Option<u64> {
    use std::ffi::CString;
    use std::mem::size_of;
    use std::ptr;

    let key = CString::new("hw.memsize").ok()?;
    let mut value: u64 = 0;
    let mut len = size_of::<u64>();
    // SAFETY: `value` and `len` are valid for writes and `len` holds the
    // size of `value`; no new value is being set.
    #[allow(unsafe_code)]
    let rc = unsafe {
        libc::sysctlbyname(
            key.as_ptr(),
            &mut value as *mut u64 as *mut libc::c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc == 0 && len == size_of::<u64>() {
        Some(value)
    } else {
        None
    }
}

/// Total physical memory in bytes, if the platform reports it.
#[cfg(target_os = "linux")]
pub fn physical_memory_bytes() -> Option<u64> {
    let mut info = std::mem::MaybeUninit::<libc::sysinfo>::uninit();
    // SAFETY: sysinfo only writes into the struct we hand it and the result
    // is read only after a zero return code.
    #[allow(unsafe_code)]
    let info = unsafe {
        if libc::sysinfo(info.as_mut_ptr()) != 0 {
            return None;
        }
        info.assume_init()
    };
    #[allow(clippy::unnecessary_cast)]
    let total = (info.totalram as u64).saturating_mul(info.mem_unit as u64);
    Some(total)
}

/// Total physical memory in bytes, if the platform reports it.
#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn physical_memory_bytes() -> Option<u64> {
    None
}

/// Physical memory, falling back to [`FALLBACK_PHYSICAL_MEMORY`].
pub fn physical_memory_or_fallback() -> u64 {
    match physical_memory_bytes() {
        Some(bytes) if bytes > 0 => bytes,
        _ => {
            warn!(
                fallback_bytes = FALLBACK_PHYSICAL_MEMORY,
                "Could not query physical memory, assuming fallback"
            );
            FALLBACK_PHYSICAL_MEMORY
        }
    }
}

/// Convert a byte count to mebibytes for display.
pub fn bytes_to_mb(bytes: usize) -> f64 {
    bytes as f64 / MIB as f64
}
