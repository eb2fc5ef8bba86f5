pub mod admin;
pub mod student;

pub use admin::Admin;
pub use student::{PaymentReceipt, Student, StudentPatch};
