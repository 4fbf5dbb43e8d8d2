//! Size-based cost: candidates are cheaper the fewer AST nodes their
//! representation and return expression together need, under the working
//! assumption that node count tracks both memory footprint and maintenance
//! cost closely enough for the scenarios this system targets.

use crate::traits::{Candidate, CostModel};

pub struct DefaultCostModel;

impl CostModel for DefaultCostModel {
    fn cost(&self, candidate: &Candidate) -> u64 {
        let rep_cost: usize = candidate.rep.iter().map(|(_, e)| e.size()).sum();
        (rep_cost + candidate.ret.size()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use increq_ast::{Exp, Type, Var};

    #[test]
    fn fewer_nodes_cost_less() {
        let model = DefaultCostModel;
        let xs = Exp::var(Var::new("xs", Type::bag(Type::Int)));
        let small = Candidate::new(vec![], xs.clone());
        let large = Candidate::new(vec![], Exp::distinct(Exp::distinct(xs)));
        assert!(model.is_better(&small, &large));
    }
}
