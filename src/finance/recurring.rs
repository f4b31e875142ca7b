use time::{Date, Duration, Month};

use crate::storage::models::{Cents, Frequency, MovementKind, RecurringMovement};

/// `months` calendar months after `start`, on `day` or the last day of a
/// shorter month.
fn add_months(start: Date, months: i32, day: u8) -> Option<Date> {
    let index = start.year() * 12 + (u8::from(start.month()) as i32 - 1) + months;
    let year = index.div_euclid(12);
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8).ok()?;
    (1..=day)
        .rev()
        .find_map(|d| Date::from_calendar_date(year, month, d).ok())
}

fn nth_occurrence(movement: &RecurringMovement, n: i32) -> Option<Date> {
    match movement.frequency {
        Frequency::Weekly => movement
            .next_date
            .checked_add(Duration::weeks(i64::from(n))),
        Frequency::Monthly => add_months(movement.next_date, n, movement.next_date.day()),
    }
}

/// Dates in `[from, to]` on which an active movement falls, starting at its
/// next date.
pub fn occurrences(movement: &RecurringMovement, from: Date, to: Date) -> Vec<Date> {
    let mut dates = Vec::new();
    if !movement.active {
        return dates;
    }
    let mut n = 0;
    while let Some(date) = nth_occurrence(movement, n) {
        if date > to {
            break;
        }
        if date >= from {
            dates.push(date);
        }
        n += 1;
    }
    dates
}

/// Projected (income, expense) totals of the movements within `[from, to]`,
/// or `None` when a total overflows.
pub fn project(movements: &[RecurringMovement], from: Date, to: Date) -> Option<(Cents, Cents)> {
    movements
        .iter()
        .try_fold((0 as Cents, 0 as Cents), |(income, expense), movement| {
            let count = Cents::try_from(occurrences(movement, from, to).len()).ok()?;
            let amount = movement.amount_cents.checked_mul(count)?;
            match movement.kind {
                MovementKind::Income => Some((income.checked_add(amount)?, expense)),
                MovementKind::Expense => Some((income, expense.checked_add(amount)?)),
            }
        })
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let first = date.replace_day(1).unwrap_or(date);
    let last = add_months(first, 1, 1)
        .and_then(|next| next.previous_day())
        .unwrap_or(date);
    (first, last)
}
