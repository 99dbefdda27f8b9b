use psf_metric::{compute_q, MetricParameters, Moments, PsfStack};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "psf-metric", about = "PSF interpolation quality metric")]
struct Opt {
    /// Interpolated PSF images file (.npy or .npz)
    #[structopt(short = "i", long = "psf-int")]
    psf_int: String,
    /// True PSF images file (.npy or .npz)
    #[structopt(short = "t", long = "psf-true")]
    psf_true: String,
    /// Target PSF ellipticity stability
    #[structopt(short = "e", long = "target-ellip", default_value = "2e-4")]
    target_ellip: f64,
    /// Target PSF size stability
    #[structopt(short = "r", long = "target-size", default_value = "1e-3")]
    target_size: f64,
    /// Normalization parameter
    #[structopt(short = "n", long, default_value = "2000")]
    eta: f64,
    /// Dispersion due to pixel noise
    #[structopt(short = "s", long = "sigma", default_value = "1")]
    sigma_squared: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let opt = Opt::from_args();

    let psf_true = PsfStack::load(&opt.psf_true)?;
    log::info!("loaded {} true PSFs", psf_true.len());
    println!("True PSFs: {}", opt.psf_true);

    let psf_int = PsfStack::load(&opt.psf_int)?;
    log::info!("loaded {} interpolated PSFs", psf_int.len());
    println!("Interpolated PSFs: {}", opt.psf_int);

    let params = MetricParameters {
        target_ellipticity: opt.target_ellip,
        target_size: opt.target_size,
        eta: opt.eta,
        sigma_squared: opt.sigma_squared,
    };
    let q = compute_q(&psf_int, &psf_true, &Moments, &params)?;
    println!("Q Value: {}", q);

    Ok(())
}
