pub mod account;
pub mod attendance;
pub mod class;
pub mod student;
pub mod subject;

pub use account::Account;
pub use attendance::{AttendanceRecord, AttendanceSession, AttendanceStatus};
pub use class::Class;
pub use student::Student;
pub use subject::{ExclusionEntry, Subject};
