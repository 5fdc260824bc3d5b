pub mod common;
mod full_run;
