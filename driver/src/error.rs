use kernel::KernelError;

/// Lifts a driver-specific failure into the shared error context.
pub trait ConvertError {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}
