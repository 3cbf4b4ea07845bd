pub mod machines;
pub mod plan;
pub mod version;
pub mod watch;

pub(crate) fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}
