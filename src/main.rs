fn main() -> std::process::ExitCode {
    hospadmin_lib::run()
}
