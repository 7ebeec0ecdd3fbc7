/// The only role allowed through the protected API scope.
pub const KARYAWAN: &str = "karyawan";

/// Roles are free-form strings in the store; only an exact match grants access.
pub fn is_privileged(role: &str) -> bool {
    role == KARYAWAN
}
