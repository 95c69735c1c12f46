// Process exit codes. Usage errors are reported by clap itself.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
