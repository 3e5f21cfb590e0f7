use std::{fmt, io};

use anyhow::Error;

use adiv_core::Counts;

use super::{Options, Statistic};

#[derive(Clone, Debug, PartialEq)]
pub struct StatisticWithOptions {
    statistic: Statistic,
    precision: usize,
}

impl StatisticWithOptions {
    pub fn new(statistic: Statistic, precision: usize) -> Self {
        Self {
            statistic,
            precision,
        }
    }
}

#[derive(Debug)]
pub struct Runner<W> {
    writer: W,
    counts: Counts,
    statistics: Vec<StatisticWithOptions>,
    options: Options,
    header: bool,
    delimiter: char,
}

impl<W> Runner<W>
where
    W: io::Write,
{
    pub fn new(
        writer: W,
        counts: Counts,
        statistics: Vec<StatisticWithOptions>,
        options: Options,
        header: bool,
        delimiter: char,
    ) -> Self {
        Self {
            writer,
            counts,
            statistics,
            options,
            header,
            delimiter,
        }
    }

    pub fn run(&mut self) -> Result<(), Error> {
        if self.header {
            self.write_header()?;
        }

        self.write_statistics()
    }

    fn write_header(&mut self) -> Result<(), Error> {
        let header_names = self
            .statistics
            .iter()
            .map(|s| s.statistic.header_name())
            .collect::<Vec<_>>();

        self.write_with_delimiter(header_names)
    }

    fn write_statistics(&mut self) -> Result<(), Error> {
        let statistics = self
            .statistics
            .iter()
            .map(|s| -> Result<String, Error> {
                let stat = s.statistic.calculate(&self.counts, &self.options)?;
                if stat.is_nan() {
                    log::warn!("{} is undefined for input counts", s.statistic);
                }
                Ok(format!("{stat:.precision$}", precision = s.precision))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.write_with_delimiter(statistics)
    }

    fn write_with_delimiter<I>(&mut self, items: I) -> Result<(), Error>
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        for (i, x) in items.into_iter().enumerate() {
            if i > 0 {
                write!(self.writer, "{}", self.delimiter)?;
            }
            write!(self.writer, "{x}")?;
        }
        writeln!(self.writer)?;

        Ok(())
    }
}
