mod helpers;

mod next_occurrence;
mod pg_store;
mod regeneration;
mod rsvp;
