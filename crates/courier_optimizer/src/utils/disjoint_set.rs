/// Disjoint set union over dense indices `0..len`, with path compression.
pub struct DisjointSet {
    parent: Vec<usize>,
    num_components: usize,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        DisjointSet {
            parent: (0..len).collect(),
            num_components: len,
        }
    }

    pub fn find(&mut self, i: usize) -> usize {
        let parent = self.parent[i];
        if parent == i {
            i
        } else {
            let root = self.find(parent);
            self.parent[i] = root;
            root
        }
    }

    pub fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i != root_j {
            // Keep the smallest index as root so component order is stable
            let (root, child) = if root_i < root_j {
                (root_i, root_j)
            } else {
                (root_j, root_i)
            };
            self.parent[child] = root;
            self.num_components -= 1;
        }
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Components ordered by their smallest member, members in ascending order.
    pub fn components(&mut self) -> Vec<Vec<usize>> {
        let len = self.parent.len();
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); len];
        for i in 0..len {
            let root = self.find(i);
            by_root[root].push(i);
        }

        by_root
            .into_iter()
            .filter(|component| !component.is_empty())
            .collect()
    }
}
