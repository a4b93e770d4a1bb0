mod contacts;
mod invalid_json;
mod users;
