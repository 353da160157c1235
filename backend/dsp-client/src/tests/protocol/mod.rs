mod command;
mod response;
