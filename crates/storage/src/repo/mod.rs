mod catalog;
mod files;
mod reviews;
