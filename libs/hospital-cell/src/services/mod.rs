pub mod assignment;
pub mod department;
pub mod hospital;

pub use assignment::AssignmentService;
pub use department::DepartmentService;
pub use hospital::HospitalService;
