use kernel::KernelError;

/// Maps a store-specific error into its `KernelError` context. Implemented per
/// backend next to the connection code that produces the error.
pub(crate) trait ConvertError {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}
