mod device;
mod transport;
