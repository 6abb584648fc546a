// Library root: domain records, the store seam the scoring job reads and
// writes through, and the SQLite implementation of that seam.

pub mod db;
pub mod model;
pub mod store;
