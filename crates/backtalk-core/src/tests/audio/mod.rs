mod capture;
mod playback;
mod resampler;
mod store;
