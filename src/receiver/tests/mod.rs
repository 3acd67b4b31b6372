mod announce_handler;
mod control_receiver;
mod rtp_receiver;
mod rtsp_handler;
mod sequence_tracker;
mod timing;

mod artwork_handler;
mod metadata_handler;
mod password_auth_tests;
mod set_parameter_handler;
mod volume_handler;
