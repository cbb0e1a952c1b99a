pub mod accounts;
pub mod booking;
pub mod cascade;
pub mod catalog;
pub mod cleanup;
pub mod payment;
pub mod schedule;
pub mod seats;
