//! Portfolio entries and early-exercise schedules.
//!
//! A portfolio is a slice of [`PortfolioEntry`] values. Plain products are
//! valued as they are. Early-exercise products carry an [`ExerciseSchedule`]:
//! at each exercise date the holder (long optionality) or the counterparty
//! (short optionality) may replace the product's remaining cashflows with
//! those of a post-exercise product.

use crate::traits::Product;
use crate::types::{Date, ScheduleError};

/// One exercise opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseEvent {
    /// Exercise date
    pub date: Date,
    /// Index into the schedule's post-exercise products
    pub post_exercise_index: usize,
    /// `true` if the holder chooses, `false` if the counterparty chooses
    pub long_optionality: bool,
}

/// Exercise dates, post-exercise products and who holds each choice.
///
/// Events are kept in ascending date order.
///
/// # Examples
///
/// ```
/// use pricer_core::traits::{ExerciseEvent, ExerciseSchedule};
/// # use pricer_core::traits::Product;
/// # use pricer_core::types::{Cashflow, Currency, Date, MarketObservable, SimulationError};
/// # #[derive(Debug, Clone)]
/// # struct Nothing;
/// # impl Product for Nothing {
/// #     fn set_value_date(&mut self, _: Date) {}
/// #     fn reset(&mut self) {}
/// #     fn required_indices(&self) -> Vec<MarketObservable> { Vec::new() }
/// #     fn required_index_dates(&self, _: &MarketObservable) -> Vec<Date> { Vec::new() }
/// #     fn set_index_values(&mut self, _: &MarketObservable, _: &[f64]) {}
/// #     fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> { Ok(Vec::new()) }
/// #     fn cashflow_currencies(&self) -> Vec<Currency> { Vec::new() }
/// #     fn cashflow_dates(&self, _: Currency) -> Vec<Date> { Vec::new() }
/// #     fn clone_box(&self) -> Box<dyn Product> { Box::new(self.clone()) }
/// # }
///
/// let d1 = Date::from_ymd(2025, 1, 1).unwrap();
/// let d2 = Date::from_ymd(2025, 7, 1).unwrap();
/// let schedule = ExerciseSchedule::new(
///     vec![
///         ExerciseEvent { date: d2, post_exercise_index: 0, long_optionality: true },
///         ExerciseEvent { date: d1, post_exercise_index: 0, long_optionality: true },
///     ],
///     vec![Box::new(Nothing)],
/// )
/// .unwrap();
///
/// assert_eq!(schedule.exercise_dates(), vec![d1, d2]);
/// assert_eq!(schedule.post_exercise_product_at(d2), Some(0));
/// assert!(schedule.is_long_optionality(d1));
/// ```
#[derive(Debug, Clone)]
pub struct ExerciseSchedule {
    events: Vec<ExerciseEvent>,
    post_exercise: Vec<Box<dyn Product>>,
}

impl ExerciseSchedule {
    /// Builds a schedule, sorting events by date.
    ///
    /// # Errors
    ///
    /// - `ScheduleError::NoExerciseDates` if `events` is empty
    /// - `ScheduleError::DuplicateExerciseDate` if two events share a date
    /// - `ScheduleError::PostExerciseIndexOutOfRange` for a dangling index
    pub fn new(
        mut events: Vec<ExerciseEvent>,
        post_exercise: Vec<Box<dyn Product>>,
    ) -> Result<Self, ScheduleError> {
        if events.is_empty() {
            return Err(ScheduleError::NoExerciseDates);
        }
        events.sort_by_key(|e| e.date);
        for pair in events.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(ScheduleError::DuplicateExerciseDate(pair[0].date));
            }
        }
        if let Some(bad) = events
            .iter()
            .find(|e| e.post_exercise_index >= post_exercise.len())
        {
            return Err(ScheduleError::PostExerciseIndexOutOfRange {
                date: bad.date,
                index: bad.post_exercise_index,
                available: post_exercise.len(),
            });
        }
        Ok(Self {
            events,
            post_exercise,
        })
    }

    /// Builds a schedule where every date exercises into the same product
    /// with the same optionality.
    pub fn uniform(
        dates: &[Date],
        post_exercise: Box<dyn Product>,
        long_optionality: bool,
    ) -> Result<Self, ScheduleError> {
        let events = dates
            .iter()
            .map(|&date| ExerciseEvent {
                date,
                post_exercise_index: 0,
                long_optionality,
            })
            .collect();
        Self::new(events, vec![post_exercise])
    }

    /// Exercise events in ascending date order.
    pub fn events(&self) -> &[ExerciseEvent] {
        &self.events
    }

    /// Exercise dates in ascending order.
    pub fn exercise_dates(&self) -> Vec<Date> {
        self.events.iter().map(|e| e.date).collect()
    }

    /// The post-exercise products.
    pub fn post_exercise_products(&self) -> &[Box<dyn Product>] {
        &self.post_exercise
    }

    /// Index of the product entered by exercising on `date`, if `date` is an
    /// exercise date.
    pub fn post_exercise_product_at(&self, date: Date) -> Option<usize> {
        self.event_at(date).map(|e| e.post_exercise_index)
    }

    /// Whether the holder owns the choice on `date`. `false` for dates that
    /// are not exercise dates.
    pub fn is_long_optionality(&self, date: Date) -> bool {
        self.event_at(date).is_some_and(|e| e.long_optionality)
    }

    fn event_at(&self, date: Date) -> Option<&ExerciseEvent> {
        self.events
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|i| &self.events[i])
    }
}

/// A portfolio member.
///
/// The early-exercise case is explicit so that portfolio expansion is
/// exhaustive at compile time.
#[derive(Debug, Clone)]
pub enum PortfolioEntry {
    /// A product valued as it is.
    Plain(Box<dyn Product>),
    /// A product whose remaining cashflows can be exchanged on exercise.
    EarlyExercise {
        /// Cashflows received until exercise
        product: Box<dyn Product>,
        /// Exercise dates and post-exercise products
        schedule: ExerciseSchedule,
    },
}

impl PortfolioEntry {
    /// Wraps a plain product.
    pub fn plain<P: Product + 'static>(product: P) -> Self {
        PortfolioEntry::Plain(Box::new(product))
    }

    /// Wraps an early-exercise product.
    pub fn early_exercise<P: Product + 'static>(product: P, schedule: ExerciseSchedule) -> Self {
        PortfolioEntry::EarlyExercise {
            product: Box::new(product),
            schedule,
        }
    }

    /// The product valued up to exercise (or throughout, for plain entries).
    pub fn product(&self) -> &dyn Product {
        match self {
            PortfolioEntry::Plain(product) => product.as_ref(),
            PortfolioEntry::EarlyExercise { product, .. } => product.as_ref(),
        }
    }

    /// The exercise schedule, if any.
    pub fn schedule(&self) -> Option<&ExerciseSchedule> {
        match self {
            PortfolioEntry::Plain(_) => None,
            PortfolioEntry::EarlyExercise { schedule, .. } => Some(schedule),
        }
    }
}

impl From<Box<dyn Product>> for PortfolioEntry {
    fn from(product: Box<dyn Product>) -> Self {
        PortfolioEntry::Plain(product)
    }
}
