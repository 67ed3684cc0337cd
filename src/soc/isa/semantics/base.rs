//! Arithmetic, memory and control-flow instructions.

use crate::soc::isa::error::FaultKind;
use crate::soc::isa::machine::HostArithResult;

use super::trace::HostOpKind;
use super::{ExecutionContext, Flow, SemanticResult};

/// `LIFT $rd,$rs,$rt`: signed add that faults on overflow without writing rd.
pub fn lift(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let lhs = ctx.read_operand(1);
    let rhs = ctx.read_operand(2);
    let sum = ctx.add(lhs, rhs);
    if sum.overflow {
        return Err(FaultKind::ArithmeticOverflow);
    }
    ctx.write_operand(0, sum.value);
    Ok(Flow::Continue)
}

/// `DROP $rd,$rs,$rt`: wrapping subtract, never faults.
pub fn drop(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let lhs = ctx.read_operand(1);
    let rhs = ctx.read_operand(2);
    let diff = ctx.sub(lhs, rhs);
    ctx.write_operand(0, diff.value);
    Ok(Flow::Continue)
}

/// `COMBUST $rt,$rs,imm`: wrapping add of a sign-extended immediate.
pub fn combust(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let base = ctx.read_operand(1);
    let imm = ctx.immediate_operand(2);
    let sum = ctx.add(base, imm);
    ctx.write_operand(0, sum.value);
    Ok(Flow::Continue)
}

fn effective_address(ctx: &mut ExecutionContext<'_>) -> u32 {
    let base = ctx.read_operand(2);
    base.wrapping_add(ctx.immediate_operand(1)) as u32
}

/// `LOADFUEL $rd,offset($rs)`
pub fn load_fuel(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let address = effective_address(ctx);
    let value = ctx.load_word(address)?;
    ctx.write_operand(0, value);
    Ok(Flow::Continue)
}

/// `STOREFUEL $rd,offset($rs)`
pub fn store_fuel(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let address = effective_address(ctx);
    let value = ctx.read_operand(0);
    ctx.store_word(address, value)?;
    Ok(Flow::Continue)
}

fn branch_if(ctx: &mut ExecutionContext<'_>, taken: fn(i32, i32) -> bool) -> SemanticResult {
    let lhs = ctx.read_operand(0);
    let rhs = ctx.read_operand(1);
    if taken(lhs, rhs) {
        Ok(Flow::Redirect(ctx.target_operand(2)))
    } else {
        Ok(Flow::Continue)
    }
}

pub fn eq_branch(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    branch_if(ctx, |lhs, rhs| lhs == rhs)
}

pub fn less_branch(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    branch_if(ctx, |lhs, rhs| lhs < rhs)
}

pub fn neq_branch(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    branch_if(ctx, |lhs, rhs| lhs != rhs)
}

/// `WARP label`: unconditional jump.
pub fn warp(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    Ok(Flow::Redirect(ctx.target_operand(0)))
}

/// `SETLESS $rd,$rs,$rt`: signed compare.
pub fn set_less(ctx: &mut ExecutionContext<'_>) -> SemanticResult {
    let lhs = ctx.read_operand(1);
    let rhs = ctx.read_operand(2);
    let value = i32::from(lhs < rhs);
    ctx.trace_host(
        HostOpKind::SetLess,
        lhs,
        rhs,
        HostArithResult::new(value, false, false),
    );
    ctx.write_operand(0, value);
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{DATA, Fixture};
    use crate::soc::bus::BusError;
    use crate::soc::isa::error::FaultKind;
    use crate::soc::isa::machine::Opcode;
    use crate::soc::isa::semantics::Flow;

    #[test]
    fn lift_adds_and_faults_on_overflow() {
        let mut fx = Fixture::new();
        fx.registers.write(1, 40);
        fx.registers.write(2, 2);
        assert_eq!(fx.run(Opcode::Lift, &[3, 1, 2]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), 42);

        fx.registers.write(1, i32::MAX);
        fx.registers.write(2, 1);
        fx.registers.write(3, 7);
        assert_eq!(
            fx.run(Opcode::Lift, &[3, 1, 2]),
            Err(FaultKind::ArithmeticOverflow)
        );
        assert_eq!(fx.registers.read(3), 7, "destination untouched on fault");

        fx.registers.write(1, i32::MIN);
        fx.registers.write(2, -1);
        assert_eq!(
            fx.run(Opcode::Lift, &[3, 1, 2]),
            Err(FaultKind::ArithmeticOverflow)
        );
    }

    #[test]
    fn drop_and_combust_wrap_silently() {
        let mut fx = Fixture::new();
        fx.registers.write(1, i32::MIN);
        fx.registers.write(2, 1);
        assert_eq!(fx.run(Opcode::Drop, &[3, 1, 2]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), i32::MAX);

        fx.registers.write(1, 10);
        assert_eq!(fx.run(Opcode::Combust, &[5, 1, 0xFFFF]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(5), 9, "0xFFFF sign-extends to -1");

        fx.registers.write(1, i32::MAX);
        assert_eq!(fx.run(Opcode::Combust, &[5, 1, 1]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(5), i32::MIN);
    }

    #[test]
    fn load_and_store_use_base_plus_offset() {
        let mut fx = Fixture::new();
        fx.registers.write(29, (DATA + 16) as i32);
        fx.registers.write(4, -77);
        assert_eq!(fx.run(Opcode::StoreFuel, &[4, -8, 29]), Ok(Flow::Continue));
        assert_eq!(fx.memory.load_word(DATA + 8).expect("stored"), -77);

        assert_eq!(fx.run(Opcode::LoadFuel, &[6, 0xFFF8, 29]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(6), -77);
    }

    #[test]
    fn load_fault_leaves_destination_unchanged() {
        let mut fx = Fixture::new();
        fx.registers.write(29, (DATA + 2) as i32);
        fx.registers.write(6, 123);
        assert_eq!(
            fx.run(Opcode::LoadFuel, &[6, 0, 29]),
            Err(FaultKind::Address(BusError::Misaligned {
                address: DATA + 2,
                width: 4
            }))
        );
        assert_eq!(fx.registers.read(6), 123);

        fx.registers.write(29, 0);
        let fault = fx
            .run(Opcode::StoreFuel, &[6, 0, 29])
            .expect_err("address 0 is unmapped");
        assert_eq!(fault.cause_code(), 4);
    }

    #[test]
    fn branches_compare_signed_values() {
        let mut fx = Fixture::new();
        fx.registers.write(1, -5);
        fx.registers.write(2, 3);
        assert_eq!(
            fx.run(Opcode::LessBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Redirect(0x0040_0100))
        );
        assert_eq!(
            fx.run(Opcode::EqBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Continue)
        );
        assert_eq!(
            fx.run(Opcode::NeqBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Redirect(0x0040_0100))
        );
        fx.registers.write(2, -5);
        assert_eq!(
            fx.run(Opcode::EqBranch, &[1, 2, 0x0040_0040]),
            Ok(Flow::Redirect(0x0040_0040))
        );
        assert_eq!(
            fx.run(Opcode::Warp, &[0x0040_0000]),
            Ok(Flow::Redirect(0x0040_0000))
        );
    }

    #[test]
    fn branches_fall_through_when_comparison_fails() {
        let mut fx = Fixture::new();
        fx.registers.write(1, -7);
        fx.registers.write(2, -7);
        assert_eq!(
            fx.run(Opcode::LessBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Continue),
            "equal operands are not less"
        );
        assert_eq!(
            fx.run(Opcode::NeqBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Continue)
        );

        fx.registers.write(1, 4);
        fx.registers.write(2, -3);
        assert_eq!(
            fx.run(Opcode::LessBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Continue),
            "rs > rt under signed compare"
        );
        assert_eq!(
            fx.run(Opcode::EqBranch, &[1, 2, 0x0040_0100]),
            Ok(Flow::Continue)
        );
    }

    #[test]
    fn set_less_writes_zero_or_one() {
        let mut fx = Fixture::new();
        fx.registers.write(1, -1);
        fx.registers.write(2, 0);
        assert_eq!(fx.run(Opcode::SetLess, &[3, 1, 2]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), 1);
        assert_eq!(fx.run(Opcode::SetLess, &[3, 2, 1]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), 0);

        fx.registers.write(1, -7);
        fx.registers.write(2, -7);
        fx.registers.write(3, 1);
        assert_eq!(fx.run(Opcode::SetLess, &[3, 1, 2]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), 0, "equal values are not less");

        fx.registers.write(2, -6);
        assert_eq!(fx.run(Opcode::SetLess, &[3, 1, 2]), Ok(Flow::Continue));
        assert_eq!(fx.registers.read(3), 1, "-7 < -6");
    }
}
