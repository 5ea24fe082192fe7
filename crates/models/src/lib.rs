pub mod course;
pub mod days;
pub mod grade;
pub mod requirement;
pub mod requisite;
pub mod student;
pub mod term;
pub mod time;
