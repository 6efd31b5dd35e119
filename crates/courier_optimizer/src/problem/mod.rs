pub mod address_book;
pub mod address_correction;
pub mod delivery_problem;
pub mod distance_matrix;
pub mod load_unit;
pub mod location;
pub mod miles;
pub mod mph;
pub mod package;
pub mod package_note;
pub mod truck;
