use pscc_drv::Session;

fn main() {
    if let Err(error) = Session::new().run() {
        eprintln!("error: {:#}", error);
        std::process::exit(1);
    }
}
