use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Target name is not one of the known hardware targets.
    #[snafu(display("unknown target: {target}"))]
    UnknownTarget { target: String },

    /// Precision name is not one of the known precisions.
    #[snafu(display("unknown precision: {precision}"))]
    UnknownPrecision { precision: String },

    #[snafu(display("malformed place '{place}': expected <target>[/<precision>]"))]
    MalformedPlace { place: String },
}
