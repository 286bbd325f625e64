//! Top-N: a bounded heap instead of a full sort.
//!
//! The heap keeps at most `n` tuples with the *worst* kept tuple (by the
//! final order) at the root, so an incoming tuple either displaces the root
//! or is discarded in O(log n). Draining the heap yields reverse order; the
//! buffer is reversed once at the end.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::execution_common::compare_by_order_bys;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::topn_plan::TopNPlanNode;
use crate::storage::table::tuple::Tuple;

pub struct TopNExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<TopNPlanNode>,
    child_executor: Box<ExecutorType>,
    output_tuples: Vec<Tuple>,
    cursor: usize,
}

/// Binary max-heap over a runtime comparator; the root is the greatest
/// element under `less`.
struct BoundedHeap<'a> {
    data: Vec<Tuple>,
    less: Box<dyn Fn(&Tuple, &Tuple) -> bool + 'a>,
}

impl<'a> BoundedHeap<'a> {
    fn new(less: Box<dyn Fn(&Tuple, &Tuple) -> bool + 'a>) -> Self {
        Self {
            data: Vec::new(),
            less,
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn peek(&self) -> Option<&Tuple> {
        self.data.first()
    }

    fn push(&mut self, tuple: Tuple) {
        self.data.push(tuple);
        self.sift_up(self.data.len() - 1);
    }

    fn pop(&mut self) -> Option<Tuple> {
        if self.data.is_empty() {
            return None;
        }
        let last = self.data.len() - 1;
        self.data.swap(0, last);
        let top = self.data.pop();
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        top
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if (self.less)(&self.data[parent], &self.data[idx]) {
                self.data.swap(parent, idx);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            let right = 2 * idx + 2;
            let mut largest = idx;
            if left < self.data.len() && (self.less)(&self.data[largest], &self.data[left]) {
                largest = left;
            }
            if right < self.data.len() && (self.less)(&self.data[largest], &self.data[right]) {
                largest = right;
            }
            if largest == idx {
                break;
            }
            self.data.swap(idx, largest);
            idx = largest;
        }
    }
}

impl TopNExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<TopNPlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            _context: context,
            plan,
            child_executor,
            output_tuples: Vec::new(),
            cursor: 0,
        }
    }
}

impl AbstractExecutor for TopNExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_tuples.is_empty() {
            return Ok(());
        }

        let schema = self.child_executor.get_output_schema().clone();
        let order_bys = self.plan.get_order_bys().to_vec();
        let n = self.plan.get_n();
        if n == 0 {
            return Ok(());
        }

        let less = move |a: &Tuple, b: &Tuple| -> bool {
            compare_by_order_bys(&order_bys, &schema, a, b) == Ordering::Less
        };
        let mut heap = BoundedHeap::new(Box::new(less));

        self.child_executor.init()?;
        while let Some((tuple, _)) = self.child_executor.next()? {
            if heap.len() < n {
                heap.push(tuple);
            } else {
                let replaces_top = match heap.peek() {
                    Some(top) => (heap.less)(&tuple, top),
                    None => false,
                };
                if replaces_top {
                    heap.pop();
                    heap.push(tuple);
                }
            }
        }

        while let Some(tuple) = heap.pop() {
            self.output_tuples.push(tuple);
        }
        self.output_tuples.reverse();
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        if self.cursor >= self.output_tuples.len() {
            return Ok(None);
        }
        let tuple = self.output_tuples[self.cursor].clone();
        self.cursor += 1;
        Ok(Some((tuple, RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
