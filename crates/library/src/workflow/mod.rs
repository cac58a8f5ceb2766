//! Metadata editing workflows.
//!
//! Both workflows flash their outcome onto the [`RequestContext`](crate::RequestContext):
//! a success message, or the user-facing text of a rejected input. Dependency
//! failures are not flashed, only returned.

mod report;
mod save;

pub use self::save::SaveForm;
use crate::context::RequestContext;
use crate::error::Result;

fn flash_outcome<T>(ctx: &mut RequestContext, outcome: &Result<T>, success: &str) {
    match outcome {
        Ok(_) => ctx.success(success),
        Err(err) => {
            if let Some(message) = err.user_message() {
                ctx.error(message);
            }
        },
    }
}
