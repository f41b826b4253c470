mod principal_directory_mysql;

pub use principal_directory_mysql::*;
