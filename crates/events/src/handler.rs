/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` (pure, no mutation)
/// 2. **Evolve**: apply each decided event to the aggregate
///
/// Useful in tests and for inline processing. Persistence and publication go
/// through the infrastructure dispatcher instead.
pub fn execute<A>(
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, A::Error>
where
    A: estate_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
