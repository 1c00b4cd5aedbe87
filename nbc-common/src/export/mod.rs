//! Downloadable exports: CSV tables and the photo archive

pub mod archive;
pub mod csv;

pub use archive::{photo_archive, PhotoArchive};
pub use csv::to_csv;
