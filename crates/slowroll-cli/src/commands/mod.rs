pub mod decide;
pub mod inspect;
