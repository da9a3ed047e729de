
mod interaction;
mod styling;
