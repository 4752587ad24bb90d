pub mod two_gis;
