// Copyright (c) 2024 The Hierarchical TEE Authors

//! A set of traits used to implement a rusty deterministic finite state
//! transducer

/// A marker trait indicating a particular structure is a valid input for a
/// transducer
pub trait Input {}

/// A marker trait indicating a particular structure is a valid output from a
/// transducer
pub trait Output {}

/// A marker trait indicating a particular structure is a valid state for a
/// transducer
pub trait State {}

/// A [Mealy Machine](https://en.wikipedia.org/wiki/Mealy_machine) is a
/// deterministic finite state transducer which operates to translate inputs
/// into outputs utilizing intermediate states.
///
/// Each input, state, and output is its own data structure, and implementing
/// this trait on a given state structure for a given input defines the
/// combined transition and output functions. Verification transitions cannot
/// fail: a failed check is recorded in the next state, never returned as an
/// error.
pub trait Transition<NextState: State, InputEvent: Input, OutputEvent: Output>: State {
    /// Consume this state and an input to produce a new state and output.
    fn next(self, input: InputEvent) -> (NextState, OutputEvent);
}
