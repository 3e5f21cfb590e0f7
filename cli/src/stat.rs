use std::{fmt, io, path::PathBuf};

use anyhow::Error;

use clap::{CommandFactory, Parser, ValueEnum};

use rand::{rngs::StdRng, SeedableRng};

use adiv_core::{
    estimate::{self, MichaelisMenten},
    metric::{self, GiniMethod},
    Counts,
};

use crate::input::Input;

mod runner;
use runner::{Runner, StatisticWithOptions};

/// Calculate alpha diversity statistics from counts.
#[derive(Debug, Parser)]
#[clap(name = crate::NAME, about)]
pub struct Stat {
    /// Input counts.
    ///
    /// The input counts can be provided here or read from stdin. Counts must be non-negative
    /// integers, one per taxon, separated by whitespace and/or commas.
    #[clap(value_parser, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Logarithm base used for Shannon entropy.
    #[clap(long, default_value_t = metric::DEFAULT_BASE, value_name = "FLOAT")]
    pub base: f64,

    /// Use the bias-corrected form of Chao1.
    ///
    /// The bias-corrected form is always used when there are no singletons or doubletons.
    #[clap(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub bias_corrected: bool,

    /// Delimiter between statistics.
    #[clap(short = 'd', long, default_value_t = ',', value_name = "CHAR")]
    pub delimiter: char,

    /// Method used to integrate the Lorenz curve for the Gini index.
    #[clap(long, value_enum, default_value_t = Lorenz::Rectangles, value_name = "METHOD")]
    pub gini_method: Lorenz,

    /// Include a header with the names of statistics.
    #[clap(short = 'H', long)]
    pub header: bool,

    /// Precision to use when printing statistics.
    ///
    /// If a single value is provided, this will be used for all statistics. If more than one
    /// statistic is calculated, the same number of precision specifiers may be provided, and they
    /// will be applied in the same order. Use comma to separate precision specifiers.
    #[clap(
        short = 'p',
        long,
        default_value = "6",
        use_value_delimiter = true,
        value_name = "INT,..."
    )]
    pub precision: Vec<usize>,

    /// Upper bound on the count of rare taxa for ACE.
    #[clap(long, default_value_t = estimate::DEFAULT_RARE_THRESHOLD, value_name = "INT")]
    pub rare_threshold: u64,

    /// Number of repeated fits for the Michaelis-Menten estimator.
    ///
    /// Repeats after the first start from randomly perturbed initial parameters, and the best
    /// fit is used.
    #[clap(long, default_value_t = 1, value_name = "INT")]
    pub repeats: usize,

    /// Seed for the random number generator used by the Michaelis-Menten estimator.
    #[clap(long, default_value_t = 0, value_name = "INT")]
    pub seed: u64,

    /// Statistics to calculate.
    ///
    /// More than one statistic can be output. Use comma to separate statistics.
    #[clap(
        short = 's',
        long,
        value_enum,
        required = true,
        use_value_delimiter = true,
        value_name = "STAT,..."
    )]
    pub statistics: Vec<Statistic>,
}

/// Options shared between statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    base: f64,
    bias_corrected: bool,
    gini_method: GiniMethod,
    rare_threshold: u64,
    repeats: usize,
    seed: u64,
}

impl From<&Stat> for Options {
    fn from(args: &Stat) -> Self {
        Self {
            base: args.base,
            bias_corrected: args.bias_corrected,
            gini_method: args.gini_method.into(),
            rare_threshold: args.rare_threshold,
            repeats: args.repeats,
            seed: args.seed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lorenz {
    /// Right-endpoint rectangles.
    Rectangles,
    /// Trapezoidal rule.
    Trapezoids,
}

impl From<Lorenz> for GiniMethod {
    fn from(method: Lorenz) -> Self {
        match method {
            Lorenz::Rectangles => GiniMethod::Rectangles,
            Lorenz::Trapezoids => GiniMethod::Trapezoids,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Statistic {
    /// Abundance-based coverage estimator of richness. See Chao and Lee (1992).
    Ace,
    /// Berger-Parker dominance, the relative abundance of the most abundant taxon.
    BergerParkerD,
    /// Brillouin's index of diversity.
    BrillouinD,
    /// Chao1 estimator of richness. See Chao (1984).
    Chao1,
    /// Simpson's dominance, the sum of squared relative abundances.
    Dominance,
    /// Number of taxa observed exactly twice.
    Doubles,
    /// Effective number of species, the inverse of Simpson's dominance.
    Enspie,
    /// Lower bound of Esty's confidence interval for the proportion of singletons.
    /// See Esty (1983).
    EstyCiLower,
    /// Upper bound of Esty's confidence interval for the proportion of singletons.
    /// See Esty (1983).
    EstyCiUpper,
    /// Fisher's alpha. See Fisher et al. (1943).
    FisherAlpha,
    /// Gini index of inequality.
    GiniIndex,
    /// Good's coverage of counts.
    GoodsCoverage,
    /// Heip's evenness.
    HeipE,
    /// Kempton-Taylor Q index, using the inter-quartile range.
    KemptonTaylorQ,
    /// Margalef's richness index.
    Margalef,
    /// McIntosh's dominance.
    McintoshD,
    /// McIntosh's evenness.
    McintoshE,
    /// Menhinick's richness index.
    Menhinick,
    /// Asymptotic richness from a Michaelis-Menten fit to the rarefaction curve.
    MichaelisMentenFit,
    /// Number of observed taxa.
    ObservedOtus,
    /// Pielou's evenness.
    PielouE,
    /// Robbins' probability of unobserved outcomes.
    Robbins,
    /// Shannon entropy, using the base set by `--base`.
    Shannon,
    /// Simpson's index, one minus Simpson's dominance.
    Simpson,
    /// Simpson's evenness.
    SimpsonE,
    /// Number of taxa observed exactly once.
    Singles,
    /// Strong's dominance.
    Strong,
}

impl Statistic {
    pub fn calculate(self, counts: &Counts, options: &Options) -> Result<f64, Error> {
        Ok(match self {
            Statistic::Ace => estimate::ace(counts, options.rare_threshold)?,
            Statistic::BergerParkerD => metric::berger_parker_d(counts),
            Statistic::BrillouinD => metric::brillouin_d(counts),
            Statistic::Chao1 => estimate::chao1(counts, options.bias_corrected),
            Statistic::Dominance => metric::dominance(counts),
            Statistic::Doubles => metric::doubles(counts) as f64,
            Statistic::Enspie => metric::enspie(counts),
            Statistic::EstyCiLower => estimate::esty_ci(counts).0,
            Statistic::EstyCiUpper => estimate::esty_ci(counts).1,
            Statistic::FisherAlpha => metric::fisher_alpha(counts)?,
            Statistic::GiniIndex => metric::gini_index(counts, options.gini_method),
            Statistic::GoodsCoverage => metric::goods_coverage(counts),
            Statistic::HeipE => metric::heip_e(counts),
            Statistic::KemptonTaylorQ => metric::kempton_taylor_q(counts),
            Statistic::Margalef => metric::margalef(counts),
            Statistic::McintoshD => metric::mcintosh_d(counts),
            Statistic::McintoshE => metric::mcintosh_e(counts),
            Statistic::Menhinick => metric::menhinick(counts),
            Statistic::MichaelisMentenFit => {
                let mut rng = StdRng::seed_from_u64(options.seed);
                MichaelisMenten::default()
                    .set_num_repeats(options.repeats)
                    .fit(counts, &mut rng)?
            }
            Statistic::ObservedOtus => metric::observed_otus(counts) as f64,
            Statistic::PielouE => metric::pielou_e(counts),
            Statistic::Robbins => metric::robbins(counts),
            Statistic::Shannon => metric::shannon_with_base(counts, options.base),
            Statistic::Simpson => metric::simpson(counts),
            Statistic::SimpsonE => metric::simpson_e(counts),
            Statistic::Singles => metric::singles(counts) as f64,
            Statistic::Strong => metric::strong(counts),
        })
    }

    pub fn header_name(&self) -> &'static str {
        match self {
            Statistic::Ace => "ace",
            Statistic::BergerParkerD => "berger_parker_d",
            Statistic::BrillouinD => "brillouin_d",
            Statistic::Chao1 => "chao1",
            Statistic::Dominance => "dominance",
            Statistic::Doubles => "doubles",
            Statistic::Enspie => "enspie",
            Statistic::EstyCiLower => "esty_ci_lower",
            Statistic::EstyCiUpper => "esty_ci_upper",
            Statistic::FisherAlpha => "fisher_alpha",
            Statistic::GiniIndex => "gini_index",
            Statistic::GoodsCoverage => "goods_coverage",
            Statistic::HeipE => "heip_e",
            Statistic::KemptonTaylorQ => "kempton_taylor_q",
            Statistic::Margalef => "margalef",
            Statistic::McintoshD => "mcintosh_d",
            Statistic::McintoshE => "mcintosh_e",
            Statistic::Menhinick => "menhinick",
            Statistic::MichaelisMentenFit => "michaelis_menten_fit",
            Statistic::ObservedOtus => "observed_otus",
            Statistic::PielouE => "pielou_e",
            Statistic::Robbins => "robbins",
            Statistic::Shannon => "shannon",
            Statistic::Simpson => "simpson",
            Statistic::SimpsonE => "simpson_e",
            Statistic::Singles => "singles",
            Statistic::Strong => "strong",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl Stat {
    pub fn run(self) -> Result<(), Error> {
        let counts = Input::new(self.input.clone())?.read_counts()?;
        let options = Options::from(&self);

        let statistics = match (&self.precision[..], &self.statistics[..]) {
            (&[precision], statistics) => statistics
                .iter()
                .map(|&s| StatisticWithOptions::new(s, precision))
                .collect::<Vec<_>>(),
            (precisions, statistics) if precisions.len() == statistics.len() => statistics
                .iter()
                .zip(precisions.iter())
                .map(|(&s, &p)| StatisticWithOptions::new(s, p))
                .collect::<Vec<_>>(),
            (precisions, statistics) => {
                return Err(Stat::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!(
                            "number of precision specifiers must equal one \
                                or the number of statistics \
                                (found {} precision specifiers and {} statistics)",
                            precisions.len(),
                            statistics.len()
                        ),
                    )
                    .into());
            }
        };

        let mut runner = Runner::new(
            io::stdout().lock(),
            counts,
            statistics,
            options,
            self.header,
            self.delimiter,
        );
        runner.run()
    }
}
