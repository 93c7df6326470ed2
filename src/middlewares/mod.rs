pub mod inject_headers;
