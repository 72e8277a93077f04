pub mod cli;
pub mod pages;
pub mod web;
