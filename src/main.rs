fn main() {
    ceilometer_plots::cli::run();
}
