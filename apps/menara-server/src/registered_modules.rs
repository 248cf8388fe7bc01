// This file ensures that all modules are linked and registered via
// inventory. Adding a module to the server means adding its crate here and
// to Cargo.toml.
#![allow(unused_imports)]

use static_tenants as _;
use tenancy as _;
use web_gateway as _;
