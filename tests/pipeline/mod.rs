mod determinism_json;
mod errors;
mod properties;
mod real_files;
mod scenarios;
