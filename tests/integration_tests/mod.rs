
mod mod_collection;
mod mod_config;
mod mod_errors;
mod mod_query;
