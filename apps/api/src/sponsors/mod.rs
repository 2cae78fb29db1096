// Sponsor view: threads with an identified sponsor, joined to their latest
// message and classified into a next action.

pub mod classifier;
pub mod handlers;
pub mod view;
