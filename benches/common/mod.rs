// each bench binary uses a different subset
#![allow(dead_code)]

pub mod workload;
