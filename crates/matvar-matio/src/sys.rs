//! Raw declarations for the subset of libmatio used here.
//!
//! Layout follows `matio.h` (1.5.x).

#![allow(non_camel_case_types, non_snake_case, missing_docs)]

use std::ffi::{c_char, c_int, c_void};

/// `MAT_C_DOUBLE` from `enum matio_classes`.
pub const MAT_C_DOUBLE: c_int = 6;
/// `MAT_T_DOUBLE` from `enum matio_types`.
pub const MAT_T_DOUBLE: c_int = 9;

/// A MATLAB variable as allocated by matio.
#[repr(C)]
pub struct matvar_t {
    pub nbytes: usize,
    pub rank: c_int,
    pub data_type: c_int,
    pub data_size: c_int,
    pub class_type: c_int,
    pub isComplex: c_int,
    pub isGlobal: c_int,
    pub isLogical: c_int,
    pub dims: *mut usize,
    pub name: *mut c_char,
    pub data: *mut c_void,
    pub mem_conserve: c_int,
    pub compression: c_int,
    pub internal: *mut c_void,
}

#[link(name = "matio")]
extern "C" {
    /// `opt`: 0 for a shallow copy, 1 for a deep copy.
    pub fn Mat_VarDuplicate(input: *const matvar_t, opt: c_int) -> *mut matvar_t;

    pub fn Mat_VarFree(matvar: *mut matvar_t);

    pub fn Mat_VarCreate(
        name: *const c_char,
        class_type: c_int,
        data_type: c_int,
        rank: c_int,
        dims: *const usize,
        data: *const c_void,
        opt: c_int,
    ) -> *mut matvar_t;
}
