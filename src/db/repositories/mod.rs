mod profile;
mod readings;
