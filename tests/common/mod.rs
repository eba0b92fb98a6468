// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

pub mod fixtures;
pub mod portal_session;
pub mod wiremock_helpers;
