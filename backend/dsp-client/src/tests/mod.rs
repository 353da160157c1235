mod device;
mod protocol;
mod transport;
