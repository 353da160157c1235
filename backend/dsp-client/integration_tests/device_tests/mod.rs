mod commands;
mod correlation;
mod helpers;
mod lifecycle;
